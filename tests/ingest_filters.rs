// tests/ingest_filters.rs
//
// Parser → classifier → diversity on realistic model output.

use std::collections::HashSet;

use askarg_feed::ingest::diversity::{select, DEFAULT_DIVERSITY_LIMIT};
use askarg_feed::ingest::parser::parse;
use askarg_feed::ingest::platform::{classify, Platform};

const JOBS_REPLY: &str = r#"
[
  {"title": "SDE I", "company": "Amazon", "location": "Bengaluru", "link": "https://www.amazon.jobs/en/jobs/1"},
  {"title": "SDE II", "company": "Amazon", "location": "Hyderabad", "link": "https://www.amazon.jobs/en/jobs/2"},
  {"title": "Backend Dev", "link": "https://in.linkedin.com/jobs/view/3"},
  {"title": "", "link": "https://in.indeed.com/viewjob?jk=4"},
  {"title": "Cloud Intern", "link": "https://careers.microsoft.com/5"},
  "stray string",
  {"title": "Blog post", "link": "https://medium.com/x"},
  {"title": "Data Analyst", "link": "https://careers.ibm.com/6"},
  {"title": "SRE", "link": "https://careers.google.com/7"},
  {"title": "OSS role", "link": "https://github.com/careers/8"}
]
"#;

#[test]
fn parse_keeps_order_and_drops_invalid() {
    let posts = parse(JOBS_REPLY);
    assert_eq!(posts.len(), 8);
    assert_eq!(posts[0].title, "SDE I");
    assert_eq!(posts[0].company, "Amazon");
    assert_eq!(posts.last().unwrap().title, "OSS role");
}

#[test]
fn selection_has_distinct_known_platforms_up_to_limit() {
    let picked = select(parse(JOBS_REPLY), DEFAULT_DIVERSITY_LIMIT);
    let titles: Vec<_> = picked.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["SDE I", "Backend Dev", "Cloud Intern", "Data Analyst", "SRE"]);

    let platforms: HashSet<_> = picked.iter().map(|p| classify(&p.link)).collect();
    assert_eq!(platforms.len(), picked.len());
    assert!(!platforms.contains(&Platform::Other));
}

#[test]
fn selection_never_backfills() {
    let only_linkedin = r#"[
        {"title":"a","link":"https://linkedin.com/1"},
        {"title":"b","link":"https://linkedin.com/2"},
        {"title":"c","link":"https://example.com/3"}
    ]"#;
    assert_eq!(select(parse(only_linkedin), 5).len(), 1);
    assert!(select(parse("{}"), 5).is_empty());
}
