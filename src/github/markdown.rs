use chrono::SecondsFormat;

use crate::database::models::{Collection, Link};

pub fn render_collection(collection: &Collection, links: &[Link]) -> String {
    let mut markdown = format!("# {}\n\n", collection.title);
    markdown.push_str(&format!(
        "Created: {}\n",
        collection.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    markdown.push_str(&format!(
        "Last Updated: {}\n\n",
        collection.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    markdown.push_str("## Links\n\n");

    for link in links {
        markdown.push_str(&format!("- [{}]({})\n", link.title, link.url));
    }
    markdown
}

/// `My Reading  List` becomes `my-reading-list.md`.
pub fn collection_file_name(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{}.md", slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn collection() -> Collection {
        Collection {
            id: Uuid::nil(),
            title: "Rust Reading".into(),
            description: String::new(),
            user_id: "u1".into(),
            visibility: "private".into(),
            likes: 0,
            total_links: 1,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap(),
        }
    }

    #[test]
    fn renders_header_dates_and_links() {
        let link = Link {
            id: Uuid::nil(),
            title: "The Book".into(),
            url: "https://doc.rust-lang.org/book/".into(),
            link_collection_id: Uuid::nil(),
            user_id: "u1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let markdown = render_collection(&collection(), &[link]);
        assert_eq!(
            markdown,
            "# Rust Reading\n\n\
             Created: 2024-01-02T03:04:05.000Z\n\
             Last Updated: 2024-02-03T04:05:06.000Z\n\n\
             ## Links\n\n\
             - [The Book](https://doc.rust-lang.org/book/)\n"
        );
    }

    #[test]
    fn file_names_collapse_whitespace() {
        assert_eq!(collection_file_name("My  Reading\tList"), "my-reading-list.md");
        assert_eq!(collection_file_name("Rust"), "rust.md");
    }
}
