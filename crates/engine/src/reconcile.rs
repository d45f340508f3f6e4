use log::{debug, warn};
use rust_decimal::Decimal;

use crate::error::PortfolioError;
use crate::model::{PaymentRecord, ReconcileOutcome, Roster, UnmatchedPayment};

/// Apply a batch of payments to the roster in batch order.
///
/// Every record sharing a payment's (owner, client_id) has the amount deducted.
/// Records whose arrears end at or below zero are marked paid off (days past
/// due set to 0), which drops them out of every PAR bucket. Payments with no
/// matching record leave the roster untouched and are returned as unmatched.
///
/// The batch must already be validated. The only failure is a deduction that
/// leaves the decimal range; the roster is then left exactly as it was.
pub fn reconcile(
    roster: &mut Roster,
    payments: &[PaymentRecord],
) -> Result<ReconcileOutcome, PortfolioError> {
    let mut next = roster.clone();
    let mut outcome = ReconcileOutcome::default();

    for (index, payment) in payments.iter().enumerate() {
        let mut matched = 0;

        for record in next.matching_mut(&payment.owner, &payment.client_id) {
            matched += 1;
            // Missing arrears stay missing; such a record can never be paid off.
            let Some(arrears) = record.arrears else {
                continue;
            };
            let remaining = arrears.checked_sub(payment.amount).ok_or_else(|| {
                PortfolioError::AmountOverflow(format!(
                    "applying payment {} to client '{}' under '{}'",
                    index + 1,
                    payment.client_id,
                    payment.owner
                ))
            })?;
            record.arrears = Some(remaining);
            if remaining <= Decimal::ZERO {
                record.days_past_due = Some(0.0);
                outcome.paid_off += 1;
            }
        }

        if matched == 0 {
            outcome.unmatched.push(UnmatchedPayment {
                index,
                owner: payment.owner.clone(),
                client_id: payment.client_id.clone(),
                amount: payment.amount,
            });
        } else {
            if matched > 1 {
                debug!(
                    "payment {index} applied to {matched} records sharing ({}, {})",
                    payment.owner, payment.client_id
                );
            }
            outcome.applied += 1;
            outcome.records_updated += matched;
        }
    }

    for unmatched in &outcome.unmatched {
        warn!("{unmatched}");
    }
    *roster = next;
    Ok(outcome)
}
