// src/ingest/platform.rs
//! Source-platform classification of listing links.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LinkedIn,
    Indeed,
    Internshala,
    AngelList,
    Amazon,
    Microsoft,
    Cognizant,
    Ibm,
    Google,
    HackerEarth,
    Radixweb,
    GitHub,
    Other,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Indeed => "Indeed",
            Platform::Internshala => "Internshala",
            Platform::AngelList => "AngelList",
            Platform::Amazon => "Amazon",
            Platform::Microsoft => "Microsoft",
            Platform::Cognizant => "Cognizant",
            Platform::Ibm => "IBM",
            Platform::Google => "Google",
            Platform::HackerEarth => "HackerEarth",
            Platform::Radixweb => "Radixweb",
            Platform::GitHub => "GitHub",
            Platform::Other => "Other",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host substring → platform. Order matters: first match wins.
const RULES: &[(&str, Platform)] = &[
    ("linkedin.com", Platform::LinkedIn),
    ("indeed.com", Platform::Indeed),
    ("internshala.com", Platform::Internshala),
    ("angel.co", Platform::AngelList),
    ("wellfound.com", Platform::AngelList),
    ("amazon.jobs", Platform::Amazon),
    ("microsoft.com", Platform::Microsoft),
    ("cognizant.com", Platform::Cognizant),
    ("ibm.com", Platform::Ibm),
    ("google.com", Platform::Google),
    ("hackerearth.com", Platform::HackerEarth),
    ("radixweb.com", Platform::Radixweb),
    ("github.com", Platform::GitHub),
];

/// Classify a link by its host. Unparseable or host-less links are `Other`.
pub fn classify(link: &str) -> Platform {
    let Some(host) = host_of(link) else {
        return Platform::Other;
    };
    RULES
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map(|(_, p)| *p)
        .unwrap_or(Platform::Other)
}

fn host_of(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    url.host_str().map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hosts() {
        assert_eq!(classify("https://www.linkedin.com/jobs/view/1"), Platform::LinkedIn);
        assert_eq!(classify("https://in.indeed.com/viewjob?jk=1"), Platform::Indeed);
        assert_eq!(classify("https://wellfound.com/jobs/2"), Platform::AngelList);
        assert_eq!(classify("https://angel.co/company/x"), Platform::AngelList);
        assert_eq!(classify("https://www.amazon.jobs/en/jobs/3"), Platform::Amazon);
        assert_eq!(classify("https://careers.google.com/jobs/4"), Platform::Google);
        assert_eq!(classify("HTTPS://CAREERS.IBM.COM/job/5"), Platform::Ibm);
    }

    #[test]
    fn only_the_host_is_inspected() {
        // platform name in the path does not count
        assert_eq!(classify("https://example.org/linkedin.com/x"), Platform::Other);
        assert_eq!(classify("https://jobs.example.org/"), Platform::Other);
    }

    #[test]
    fn malformed_links_are_other() {
        assert_eq!(classify(""), Platform::Other);
        assert_eq!(classify("not a url"), Platform::Other);
        assert_eq!(classify("linkedin.com/jobs"), Platform::Other);
        assert_eq!(classify("mailto:hr@github.com"), Platform::Other);
    }
}
