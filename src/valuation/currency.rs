// Display formatting for valuations. Amounts are always rendered as US dollars
// with en-US grouping, whatever language the surrounding text is in.

const SYMBOL: &str = "$";
const GROUP_SEPARATOR: char = ',';

// Above 2^52 every f64 is a whole number, so there are no cents left to round
const WHOLE_NUMBERS_FROM: f64 = 4_503_599_627_370_496.0;

// Format an amount as `$1,234.50`, rounded half away from zero at the cent
pub fn format_currency(value: f64) -> String {
    if value.is_nan() {
        return format!("{SYMBOL}NaN");
    }

    let sign = if value < 0.0 { "-" } else { "" };

    if value.is_infinite() {
        return format!("{sign}{SYMBOL}∞");
    }

    let abs = value.abs();
    let rounded = if abs < WHOLE_NUMBERS_FROM {
        (abs * 100.0).round() / 100.0
    } else {
        abs
    };

    // Display prints the shortest digits that round-trip and never uses an exponent
    let digits = rounded.to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    let cents: String = fraction.chars().chain("00".chars()).take(2).collect();

    format!("{sign}{SYMBOL}{}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }

    grouped
}
