/// Один крор = 10 000 000
pub const CRORE: f64 = 1e7;

/// Форматирует число с разделителями тысяч (точками)
///
/// # Примеры
/// ```
/// use backend::shared::format::format_number;
/// assert_eq!(format_number(1234567), "1.234.567");
/// assert_eq!(format_number(42), "42");
/// assert_eq!(format_number(0), "0");
/// ```
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Сумма в рупиях в крорах, два знака после запятой
///
/// # Примеры
/// ```
/// use backend::shared::format::format_cr;
/// assert_eq!(format_cr(100000000.0), "₹ 10.00 Cr");
/// assert_eq!(format_cr(0.0), "₹ 0.00 Cr");
/// ```
pub fn format_cr(value: f64) -> String {
    let crores = value / CRORE;
    // -0.0 печатается как "-0.00"
    let crores = if crores == 0.0 { 0.0 } else { crores };
    format!("₹ {:.2} Cr", crores)
}
