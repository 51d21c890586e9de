use crate::{
    client::{
        hook::{PriceState, TokenPriceQuery},
        selection::{Selection, Slot},
        selector::SelectableToken,
    },
    implementations::conversion::{convert, format_quantity, format_unit_price},
};

/// Text rendering of one source/target panel.
pub fn render_panel(
    slot: Slot,
    token: Option<&SelectableToken>,
    query: &TokenPriceQuery,
    usd_amount: &str,
) -> String {
    let title = match slot {
        Slot::Source => "Source Token",
        Slot::Target => "Target Token",
    };

    let mut out = format!("{title}\n");
    let Some(token) = token else {
        out.push_str("  Select a token\n");
        return out;
    };
    out.push_str(&format!("  {}\n", token.name));

    match query.state() {
        PriceState::Idle => {}
        PriceState::Loading => out.push_str("  Loading price...\n"),
        PriceState::Failed(message) => out.push_str(&format!("  {message}\n")),
        PriceState::Loaded(data) => {
            let unit_price = data.price_info.unit_price;
            out.push_str(&format!("  Price: ${}\n", format_unit_price(unit_price)));
            if let Some(quantity) = convert(usd_amount, Some(unit_price)) {
                out.push_str(&format!(
                    "  ≈ {} {}\n",
                    format_quantity(quantity),
                    token.name
                ));
            }
        }
    }
    out
}

/// Numbered token list with `[S]`/`[T]` markers for the selected slots.
pub fn render_token_list(tokens: &[SelectableToken], selection: &Selection<SelectableToken>) -> String {
    if tokens.is_empty() {
        return "    no tokens available\n".to_string();
    }

    let mut out = String::new();
    for (index, token) in tokens.iter().enumerate() {
        let marker = match selection.slot_of(token) {
            Some(Slot::Source) => "[S]",
            Some(Slot::Target) => "[T]",
            None => "   ",
        };
        out.push_str(&format!(
            "{marker} {:>2}. {} ({}) chain {}\n",
            index + 1,
            token.name,
            token.symbol,
            token.chain_id
        ));
    }
    out
}
