/// Render an amount as Kenyan Shillings with thousands separators and two
/// decimal places (`KES 1,500.00`). A missing or non-finite amount renders
/// as the literal `N/A`.
pub fn format_kes(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.is_finite() => format!("KES {}", decimal_with_separators(value)),
        _ => "N/A".to_string(),
    }
}

fn decimal_with_separators(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{fraction:02}")
}
