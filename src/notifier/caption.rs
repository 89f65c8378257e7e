use crate::domain::Listing;
use maud::html;

/// Telegram HTML caption for a listing. All listing text is escaped.
pub fn format_caption(listing: &Listing) -> String {
    let facts = facts_line(listing);

    html! {
        "🏠 " b { (listing.address) } ", " (listing.postal_code) "\n"
        "💶 € " (format_price(listing.price)) "\n"
        @if !facts.is_empty() {
            "📐 " (facts) "\n"
        }
        @if let Some(label) = &listing.energy_label {
            "⚡ Energy label " (label) "\n"
        }
        @if let Some(year) = listing.year_built {
            "🏗 Built in " (year) "\n"
        }
        a href=(listing.id) { "View listing" }
    }
    .into_string()
}

/// Groups thousands with dots, Dutch style: 350000 -> "350.000".
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if price < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

fn facts_line(listing: &Listing) -> String {
    let mut parts = Vec::new();
    if let Some(area) = listing.living_area {
        parts.push(format!("{area} m²"));
    }
    if let Some(rooms) = listing.room_count {
        parts.push(format!("{rooms} {}", plural(rooms, "room", "rooms")));
    }
    if let Some(bedrooms) = listing.bedroom_count {
        parts.push(format!("{bedrooms} {}", plural(bedrooms, "bedroom", "bedrooms")));
    }
    parts.join(" · ")
}

fn plural<'a>(n: i64, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
