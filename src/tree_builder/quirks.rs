use super::QuirksMode;
use crate::token::AtomicToken;

static QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

static QUIRKY_PUBLIC_IDS: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

static HTML_401_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

static XHTML_10_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

#[inline]
fn starts_with_any(id: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| id.starts_with(prefix))
}

/// Whether a doctype is a parse error, i.e. isn't `<!DOCTYPE html>` or
/// one of the legacy forms of it.
pub fn is_doctype_error(token: &AtomicToken) -> bool {
    token.name() != "html"
        || token.public_identifier().is_some()
        || token
            .system_identifier()
            .is_some_and(|id| id != "about:legacy-compat")
}

pub fn quirks_mode_for(token: &AtomicToken) -> QuirksMode {
    if token.force_quirks() || token.name() != "html" {
        return QuirksMode::Quirks;
    }

    let public_id = token.public_identifier().map(str::to_ascii_lowercase);
    let system_id = token.system_identifier().map(str::to_ascii_lowercase);

    if system_id.as_deref()
        == Some("http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd")
    {
        return QuirksMode::Quirks;
    }

    let Some(public_id) = public_id else {
        return QuirksMode::NoQuirks;
    };

    if QUIRKY_PUBLIC_IDS.contains(&public_id.as_str())
        || starts_with_any(&public_id, QUIRKY_PUBLIC_PREFIXES)
        || (system_id.is_none() && starts_with_any(&public_id, HTML_401_PREFIXES))
    {
        QuirksMode::Quirks
    } else if starts_with_any(&public_id, XHTML_10_PREFIXES)
        || (system_id.is_some() && starts_with_any(&public_id, HTML_401_PREFIXES))
    {
        QuirksMode::LimitedQuirks
    } else {
        QuirksMode::NoQuirks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SegmentedString;
    use crate::tokenizer::{Token, Tokenizer};

    fn doctype(html: &str) -> AtomicToken {
        let mut tokenizer = Tokenizer::default();
        let mut input = SegmentedString::new(html);
        let mut token = Token::default();

        input.close();
        assert!(tokenizer.next_token(&mut input, &mut token));

        AtomicToken::from(&token)
    }

    #[test]
    fn standards_mode() {
        let token = doctype("<!DOCTYPE html>");

        assert_eq!(quirks_mode_for(&token), QuirksMode::NoQuirks);
        assert!(!is_doctype_error(&token));

        let token = doctype("<!DOCTYPE html SYSTEM \"about:legacy-compat\">");

        assert!(!is_doctype_error(&token));
    }

    #[test]
    fn quirks_mode() {
        for html in [
            "<!DOCTYPE>",
            "<!DOCTYPE foo>",
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">",
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\">",
            "<!DOCTYPE html PUBLIC \"HTML\">",
        ] {
            assert_eq!(quirks_mode_for(&doctype(html)), QuirksMode::Quirks, "{html}");
        }
    }

    #[test]
    fn limited_quirks_mode() {
        for html in [
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"x\">",
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Frameset//EN\" \"x\">",
        ] {
            assert_eq!(
                quirks_mode_for(&doctype(html)),
                QuirksMode::LimitedQuirks,
                "{html}"
            );
        }
    }
}
