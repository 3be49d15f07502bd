/// Context hint for a route path. Total: unknown paths get a generic hint.
pub fn location_to_context(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => "on home page".to_string(),
        ["destinations"] => "browsing destinations".to_string(),
        ["destinations" | "destination", slug, ..] => {
            format!("viewing destination {}", humanize_slug(slug))
        }
        ["blog"] => "browsing blog".to_string(),
        ["blog", slug, ..] => format!("reading blog post {}", humanize_slug(slug)),
        ["itineraries"] => "browsing itineraries".to_string(),
        ["itineraries" | "itinerary", slug, ..] => {
            format!("viewing itinerary {}", humanize_slug(slug))
        }
        _ => "browsing the site".to_string(),
    }
}

/// `new-york-city` -> `New York City`
fn humanize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
