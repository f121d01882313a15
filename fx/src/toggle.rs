//! Main-currency toggle.

use ratepair_common::MainCurrency;
use tracing::debug;

use crate::conversion::{convert, Field, FieldEdit, FieldPair};
use crate::error::FxResult;
use crate::rates::RateStore;

/// Main currency and fields after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub main: MainCurrency,
    pub fields: FieldPair,
}

/// Flip the main currency and recompute the buy field from the sell field.
///
/// The sell text is kept as typed. With an empty sell field nothing is
/// recomputed and the buy field is returned unchanged.
pub fn toggle(
    main: MainCurrency,
    fields: &FieldPair,
    rates: &RateStore,
) -> FxResult<ToggleOutcome> {
    let flipped = main.flipped();

    if fields.sell.is_empty() {
        debug!(from = %main, to = %flipped, "Toggled main currency without recompute");
        return Ok(ToggleOutcome {
            main: flipped,
            fields: fields.clone(),
        });
    }

    let recomputed = convert(&FieldEdit::new(Field::Sell, fields.sell.clone()), rates, flipped)?;
    debug!(from = %main, to = %flipped, buy = %recomputed.buy, "Toggled main currency");

    Ok(ToggleOutcome {
        main: flipped,
        fields: recomputed,
    })
}
