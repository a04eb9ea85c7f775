const FILE_SUFFIX: &str = "-meetme.png";
const FALLBACK_TEMPLATE_SLUG: &str = "template";

/// Lower-cases and joins whitespace runs with `-`. Path separators are
/// replaced too, so the result is always a single file name component.
pub fn slugify(value: &str) -> String {
    value
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// `{eventSlug}-{templateSlug}-meetme.png`
pub fn export_file_name(event_slug: &str, template_name: &str) -> String {
    let template = slugify(template_name);
    let template = if template.is_empty() {
        FALLBACK_TEMPLATE_SLUG.to_string()
    } else {
        template
    };
    let event = slugify(event_slug);
    if event.is_empty() {
        format!("{template}{FILE_SUFFIX}")
    } else {
        format!("{event}-{template}{FILE_SUFFIX}")
    }
}
