pub(crate) fn clean_cell(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_keyword(value: &str) -> String {
    clean_cell(value).to_ascii_lowercase()
}

/// Splits a `;`-separated cell, dropping blank entries.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(clean_cell)
        .filter(|item| !item.is_empty())
        .collect()
}
