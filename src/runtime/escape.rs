//! Context-dependent escaping of printed values

use crate::compiler::ContentType;

/// Escapes a value for the context it is printed in
pub trait Escaper: Send + Sync {
    fn escape(&self, context: ContentType, value: &str) -> String;
}

/// Default escaper backed by `html-escape`
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape(&self, context: ContentType, value: &str) -> String {
        match context {
            ContentType::Html | ContentType::Xml => {
                html_escape::encode_double_quoted_attribute(value).into_owned()
            }
            ContentType::Js => html_escape::encode_script(value).into_owned(),
            ContentType::Css => html_escape::encode_style(value).into_owned(),
            ContentType::Plain | ContentType::None => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_context() {
        assert_eq!(HtmlEscaper.escape(ContentType::Html, "<b>&"), "&lt;b&gt;&amp;");
        assert_eq!(HtmlEscaper.escape(ContentType::Html, "/a?b=1"), "/a?b=1");
    }

    #[test]
    fn test_plain_context_is_untouched() {
        assert_eq!(HtmlEscaper.escape(ContentType::Plain, "<b>"), "<b>");
    }

    #[test]
    fn test_script_context() {
        let escaped = HtmlEscaper.escape(ContentType::Js, "x</script>");
        assert!(!escaped.contains("</script>"));
    }
}
