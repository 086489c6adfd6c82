const BANNED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const REPLACEMENT: &str = "****";

/// Replace banned words (any case) with `****`.
///
/// Words are split on single spaces only, so `Fornax!` survives untouched.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if BANNED_WORDS.contains(&lowered.as_str()) {
                REPLACEMENT
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
