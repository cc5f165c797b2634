//! Text normalization applied to both transcriptions and reference
//! translations before they are compared.

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 7] = [
    "",
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
];

/// Lower-cases, spells out standalone numbers, drops punctuation and
/// collapses whitespace.
///
/// `.` and `:` separate words (so `"3:4"` becomes `"three four"`); every other
/// character that is neither a word character nor whitespace is removed.
/// Applying it twice gives the same result as applying it once.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(['.', ':'], " ");
    let stripped = strip_punctuation(&lowered);

    let spelled: Vec<String> = stripped
        .split_whitespace()
        .map(|token| {
            if token.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(n) = token.parse::<u64>() {
                    return strip_punctuation(&number_to_words(n));
                }
            }
            token.to_string()
        })
        .collect();

    spelled.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|&c| is_word_char(c) || c.is_whitespace())
        .collect()
}

/// English cardinal words for `n`, e.g. `1234` → `"one thousand two hundred
/// and thirty-four"`.
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push((rest % 1000) as u32);
        rest /= 1000;
    }

    let mut parts: Vec<String> = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let words = hundreds_to_words(group);
        if scale == 0 && group < 100 && !parts.is_empty() {
            parts.push(format!("and {words}"));
        } else if scale == 0 {
            parts.push(words);
        } else {
            parts.push(format!("{words} {}", SCALES[scale]));
        }
    }

    parts.join(" ")
}

fn hundreds_to_words(n: u32) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => tens_to_words(r),
        (h, 0) => format!("{} hundred", ONES[h as usize]),
        (h, r) => format!("{} hundred and {}", ONES[h as usize], tens_to_words(r)),
    }
}

fn tens_to_words(n: u32) -> String {
    match n {
        0..=19 => ONES[n as usize].to_string(),
        _ if n % 10 == 0 => TENS[(n / 10) as usize].to_string(),
        _ => format!("{}-{}", TENS[(n / 10) as usize], ONES[(n % 10) as usize]),
    }
}
