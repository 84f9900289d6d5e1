//! Plain-text and JSON output for CLI commands.

use catalog_core::{Article, DeletePrompt};
use std::io::{self, Write};

pub fn articles(out: &mut impl Write, articles: &[Article], json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, articles)?;
        return writeln!(out);
    }

    if articles.is_empty() {
        return writeln!(out, "(no articles)");
    }
    writeln!(out, "id\ttitle\tprice\timage")?;
    for article in articles {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            article.id, article.title, article.price, article.image
        )?;
    }
    Ok(())
}

pub fn article(out: &mut impl Write, article: &Article, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, article)?;
        return writeln!(out);
    }

    writeln!(out, "id: {}", article.id)?;
    writeln!(out, "title: {}", article.title)?;
    writeln!(out, "price: {}", article.price)?;
    writeln!(out, "image: {}", article.image)
}

pub fn delete_prompt(out: &mut impl Write, prompt: &DeletePrompt) -> io::Result<()> {
    writeln!(out, "{}", prompt.confirm_message)?;
    writeln!(out, "run `catalog delete {} --yes` to confirm", prompt.id)
}

pub fn line(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::ArticleId;

    fn chair() -> Article {
        Article {
            id: ArticleId(1),
            title: "Chair".to_string(),
            price: 50,
            image: "chair.png".to_string(),
        }
    }

    fn rendered(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn table_lists_one_row_per_article() {
        let text = rendered(|out| articles(out, &[chair()], false));
        assert_eq!(text, "id\ttitle\tprice\timage\n1\tChair\t50\tchair.png\n");

        let empty = rendered(|out| articles(out, &[], false));
        assert_eq!(empty, "(no articles)\n");
    }

    #[test]
    fn json_output_uses_plain_fields() {
        let text = rendered(|out| articles(out, &[chair()], true));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["image"], "chair.png");
    }

    #[test]
    fn delete_prompt_shows_message_and_confirm_hint() {
        let prompt = DeletePrompt {
            id: ArticleId(4),
            confirm_message: "sure?".to_string(),
        };
        let text = rendered(|out| delete_prompt(out, &prompt));
        assert_eq!(text, "sure?\nrun `catalog delete 4 --yes` to confirm\n");
    }
}
