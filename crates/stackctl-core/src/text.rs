//! Small string classifiers used to build menus.

/// Convert a kebab-case identifier to Title Case for display.
///
/// ```
/// use stackctl_core::text::kebab_case_to_title_case;
///
/// assert_eq!(kebab_case_to_title_case("my-example-string"), "My Example String");
/// ```
pub fn kebab_case_to_title_case(s: &str) -> String {
    s.split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `s` is a JSON document whose top-level value is an object.
///
/// Arrays, `null` and scalars are rejected.
pub fn is_stringified_json(s: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(s),
        Ok(serde_json::Value::Object(_))
    )
}
