//! User agent generation and request header values

use rand::seq::SliceRandom;
use rand::Rng;

const CHROME_VERSIONS: &[&str] = &["128.0.0.0", "129.0.0.0", "130.0.0.0", "131.0.0.0"];
const FIREFOX_VERSIONS: &[&str] = &["130.0", "131.0", "132.0", "133.0"];
const SAFARI_VERSIONS: &[&str] = &["17.5", "17.6", "18.1"];

const OS_STRINGS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_6_1",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

/// Generate a random but realistic user agent string
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let os = OS_STRINGS.choose(&mut rng).copied().unwrap_or(OS_STRINGS[0]);

    match rng.gen_range(0..10u8) {
        // Chrome (60%)
        0..=5 => {
            let chrome = CHROME_VERSIONS
                .choose(&mut rng)
                .copied()
                .unwrap_or(CHROME_VERSIONS[0]);
            format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                os, chrome
            )
        }
        // Firefox (30%)
        6..=8 => {
            let firefox = FIREFOX_VERSIONS
                .choose(&mut rng)
                .copied()
                .unwrap_or(FIREFOX_VERSIONS[0]);
            format!(
                "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
                os, firefox, firefox
            )
        }
        // Safari (10%), Mac only
        _ => {
            let safari = SAFARI_VERSIONS
                .choose(&mut rng)
                .copied()
                .unwrap_or(SAFARI_VERSIONS[0]);
            format!(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{} Safari/605.1.15",
                safari
            )
        }
    }
}

/// Accept header for HTML requests
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}
