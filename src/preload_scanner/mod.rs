//! Discovers subresources in the token stream ahead of tree construction,
//! so their fetches can start before the document is built.
mod css_scanner;

use self::css_scanner::CssScanner;
use crate::base::TextPosition;
use crate::html::{is_html_whitespace, LocalNameHash, Tag};
use crate::token::CompactToken;
use crate::tokenizer::TokenKind;
use mime::Mime;
use url::Url;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Script,
    Image,
    Stylesheet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadRequest {
    /// The element that references the resource.
    pub initiator: Tag,
    pub url: String,
    pub charset: Option<String>,
    pub resource_type: ResourceType,
    pub position: TextPosition,
}

/// Scanner state that a rewind of the background parser restores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadScannerCheckpoint {
    predicted_base_url: Option<Url>,
    in_style: bool,
    template_depth: usize,
    css_scanner: CssScanner,
}

fn is_stylesheet_link(token: &CompactToken) -> bool {
    let is_stylesheet = token.get_attribute("rel").is_some_and(|rel| {
        let mut is_stylesheet = false;

        for keyword in rel.split(is_html_whitespace) {
            if keyword.eq_ignore_ascii_case("alternate") {
                return false;
            }

            is_stylesheet |= keyword.eq_ignore_ascii_case("stylesheet");
        }

        is_stylesheet
    });

    is_stylesheet && token.get_attribute("type").map_or(true, is_css_mime_type)
}

fn is_css_mime_type(value: &str) -> bool {
    let value = value.trim_matches(is_html_whitespace);

    if value.is_empty() {
        return true;
    }

    value
        .parse::<Mime>()
        .is_ok_and(|mime| mime.type_() == mime::TEXT && mime.subtype() == mime::CSS)
}

/// The URL of the first image candidate in a `srcset` attribute.
fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    let srcset = srcset.trim_start_matches(|ch: char| is_html_whitespace(ch) || ch == ',');
    let url_end = srcset.find(is_html_whitespace).unwrap_or(srcset.len());
    let url = srcset[..url_end].trim_end_matches(',');

    (!url.is_empty()).then_some(url)
}

#[inline]
fn non_empty_attribute<'t>(token: &'t CompactToken, name: &str) -> Option<&'t str> {
    token
        .get_attribute(name)
        .map(|value| value.trim_matches(is_html_whitespace))
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct PreloadScanner {
    document_url: Option<Url>,
    predicted_base_url: Option<Url>,
    in_style: bool,
    template_depth: usize,
    css_scanner: CssScanner,
}

impl PreloadScanner {
    pub fn new(document_url: Option<Url>) -> Self {
        PreloadScanner {
            document_url,
            ..PreloadScanner::default()
        }
    }

    pub fn checkpoint(&self) -> PreloadScannerCheckpoint {
        PreloadScannerCheckpoint {
            predicted_base_url: self.predicted_base_url.clone(),
            in_style: self.in_style,
            template_depth: self.template_depth,
            css_scanner: self.css_scanner.clone(),
        }
    }

    pub fn rewind_to(&mut self, checkpoint: PreloadScannerCheckpoint) {
        self.predicted_base_url = checkpoint.predicted_base_url;
        self.in_style = checkpoint.in_style;
        self.template_depth = checkpoint.template_depth;
        self.css_scanner = checkpoint.css_scanner;
    }

    pub fn scan(&mut self, token: &CompactToken, requests: &mut Vec<PreloadRequest>) {
        match token.kind() {
            TokenKind::Character if self.in_style && self.template_depth == 0 => {
                let position = token.position();
                let base = self.base_url().cloned();
                let mut found = Vec::new();

                self.css_scanner.scan(token.data(), |url| {
                    found.push(PreloadRequest {
                        initiator: Tag::Style,
                        url: resolve(base.as_ref(), url),
                        charset: None,
                        resource_type: ResourceType::Stylesheet,
                        position,
                    });
                });

                requests.extend(found);
            }
            TokenKind::StartTag => self.scan_start_tag(token, requests),
            TokenKind::EndTag => self.scan_end_tag(token),
            _ => (),
        }
    }

    #[inline]
    fn base_url(&self) -> Option<&Url> {
        self.predicted_base_url.as_ref().or(self.document_url.as_ref())
    }

    fn scan_start_tag(&mut self, token: &CompactToken, requests: &mut Vec<PreloadRequest>) {
        let hash = LocalNameHash::from(token.data());

        if hash == Tag::Template {
            self.template_depth += 1;
        }

        if self.template_depth > 0 {
            return;
        }

        if hash == Tag::Style {
            self.in_style = true;
            self.css_scanner.reset();
            return;
        }

        if hash == Tag::Base {
            self.update_predicted_base_url(token);
            return;
        }

        let found = if hash == Tag::Script {
            non_empty_attribute(token, "src").map(|src| (Tag::Script, src, ResourceType::Script))
        } else if hash == Tag::Img {
            non_empty_attribute(token, "src")
                .or_else(|| token.get_attribute("srcset").and_then(first_srcset_candidate))
                .map(|src| (Tag::Img, src, ResourceType::Image))
        } else if hash == Tag::Link && is_stylesheet_link(token) {
            non_empty_attribute(token, "href")
                .map(|href| (Tag::Link, href, ResourceType::Stylesheet))
        } else if hash == Tag::Input
            && token
                .get_attribute("type")
                .is_some_and(|ty| ty.trim_matches(is_html_whitespace).eq_ignore_ascii_case("image"))
        {
            non_empty_attribute(token, "src").map(|src| (Tag::Input, src, ResourceType::Image))
        } else {
            None
        };

        if let Some((initiator, url, resource_type)) = found {
            let charset = match resource_type {
                ResourceType::Script | ResourceType::Stylesheet => {
                    non_empty_attribute(token, "charset").map(str::to_string)
                }
                ResourceType::Image => None,
            };

            let request = PreloadRequest {
                initiator,
                url: resolve(self.base_url(), url),
                charset,
                resource_type,
                position: token.position(),
            };

            log::trace!("Preload {:?} {}", request.resource_type, request.url);

            requests.push(request);
        }
    }

    fn scan_end_tag(&mut self, token: &CompactToken) {
        let hash = LocalNameHash::from(token.data());

        if hash == Tag::Template {
            self.template_depth = self.template_depth.saturating_sub(1);
        } else if hash == Tag::Style && self.template_depth == 0 {
            self.in_style = false;
        }
    }

    fn update_predicted_base_url(&mut self, token: &CompactToken) {
        // NOTE: only the first base element counts.
        if self.predicted_base_url.is_some() {
            return;
        }

        let Some(href) = non_empty_attribute(token, "href") else {
            return;
        };

        let base = match &self.document_url {
            Some(document_url) => document_url.join(href),
            None => Url::parse(href),
        };

        self.predicted_base_url = base.ok();
    }
}

fn resolve(base: Option<&Url>, url: &str) -> String {
    match base {
        Some(base) => base
            .join(url)
            .map_or_else(|_| url.to_string(), |resolved| resolved.to_string()),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SegmentedString;
    use crate::tokenizer::{Token, Tokenizer};

    fn tokens(html: &str) -> Vec<CompactToken> {
        let mut tokenizer = Tokenizer::default();
        let mut input = SegmentedString::new(html);
        let mut token = Token::default();
        let mut tokens = Vec::new();

        input.close();

        while tokenizer.next_token(&mut input, &mut token) {
            if token.kind() == TokenKind::StartTag {
                tokenizer.update_state_for(token.name());
            }

            tokens.push(CompactToken::new(&token, token.position()));
            token.clear();
        }

        tokens
    }

    fn scan(scanner: &mut PreloadScanner, html: &str) -> Vec<(Tag, String, ResourceType)> {
        let mut requests = Vec::new();

        for token in tokens(html) {
            scanner.scan(&token, &mut requests);
        }

        requests
            .into_iter()
            .map(|r| (r.initiator, r.url, r.resource_type))
            .collect()
    }

    fn document_scanner() -> PreloadScanner {
        PreloadScanner::new(Some(Url::parse("https://example.com/dir/page.html").unwrap()))
    }

    #[test]
    fn finds_subresources() {
        let requests = scan(
            &mut document_scanner(),
            "<script src=app.js></script><img srcset='a.png 1x, b.png 2x'>\
             <link rel='Stylesheet' href=/s.css><link rel='alternate stylesheet' href=x.css>\
             <input type=IMAGE src=go.png><script>var inline;</script>",
        );

        assert_eq!(
            requests,
            [
                (
                    Tag::Script,
                    "https://example.com/dir/app.js".to_string(),
                    ResourceType::Script
                ),
                (
                    Tag::Img,
                    "https://example.com/dir/a.png".to_string(),
                    ResourceType::Image
                ),
                (
                    Tag::Link,
                    "https://example.com/s.css".to_string(),
                    ResourceType::Stylesheet
                ),
                (
                    Tag::Input,
                    "https://example.com/dir/go.png".to_string(),
                    ResourceType::Image
                ),
            ]
        );
    }

    #[test]
    fn base_element_changes_resolution() {
        let requests = scan(
            &mut document_scanner(),
            "<base href=https://cdn.example.net/v1/><base href=/ignored/><img src=i.png>",
        );

        assert_eq!(requests[0].1, "https://cdn.example.net/v1/i.png");
    }

    #[test]
    fn link_type_must_be_css() {
        let requests = scan(
            &mut document_scanner(),
            "<link rel=stylesheet type='text/css; charset=utf-8' href=a.css>\
             <link rel=stylesheet type=text/plain href=b.css>",
        );

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "https://example.com/dir/a.css");
    }

    #[test]
    fn imports_in_style_elements() {
        let requests = scan(
            &mut document_scanner(),
            "<style>@import 'theme.css'; p { }</style><style>@import url(print.css);</style>",
        );

        assert_eq!(
            requests,
            [
                (
                    Tag::Style,
                    "https://example.com/dir/theme.css".to_string(),
                    ResourceType::Stylesheet
                ),
                (
                    Tag::Style,
                    "https://example.com/dir/print.css".to_string(),
                    ResourceType::Stylesheet
                ),
            ]
        );
    }

    #[test]
    fn template_contents_are_skipped() {
        let requests = scan(
            &mut document_scanner(),
            "<template><img src=a.png><template></template><img src=b.png></template>\
             <img src=c.png>",
        );

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "https://example.com/dir/c.png");
    }

    #[test]
    fn charset_and_position() {
        let mut scanner = PreloadScanner::new(None);
        let mut requests = Vec::new();

        for token in tokens("<p>\n  <script src=a.js charset=koi8-r></script>") {
            scanner.scan(&token, &mut requests);
        }

        assert_eq!(requests[0].url, "a.js");
        assert_eq!(requests[0].charset.as_deref(), Some("koi8-r"));
        assert_eq!(requests[0].position, TextPosition::new(1, 2));
    }

    #[test]
    fn rewind_restores_state() {
        let mut scanner = document_scanner();
        let checkpoint = scanner.checkpoint();

        scan(&mut scanner, "<base href=https://other.example/><template>");

        scanner.rewind_to(checkpoint);

        let requests = scan(&mut scanner, "<img src=a.png>");

        assert_eq!(requests[0].1, "https://example.com/dir/a.png");
    }
}
