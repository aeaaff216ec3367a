use driftnet_core::CanonicalLink;
use lol_html::{element, HtmlRewriter, Settings};
use thiserror::Error;

/// Origins whose fetched markup is never shown directly; the stored
/// page is replaced by an embed wrapper instead.
const VIDEO_PROVIDER_ORIGINS: [&str; 3] = [
    "https://www.youtube.com",
    "https://www.dailymotion.com",
    "http://www.dailymotion.com",
];

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("markup rewriting failed: {0}")]
    Rewriting(#[from] lol_html::errors::RewritingError),
    #[error("rewritten markup is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Rewrite stored markup so it can be displayed standalone.
///
/// Video-provider origins short-circuit to a full-bleed iframe pointing
/// at the origin link. For everything else, reference attributes on
/// anchors, stylesheet links, scripts and images (plus two data
/// attributes some sites hang sources on) are made absolute against the
/// origin's scheme and host. Applied at display time; stored content
/// stays unrewritten so this rule can evolve without re-ingesting.
pub fn rewrite(content: &str, origin_link: &CanonicalLink) -> Result<String, RewriteError> {
    let origin = origin_link.origin();
    if VIDEO_PROVIDER_ORIGINS.contains(&origin.as_str()) {
        return Ok(format!(
            "<iframe style=\"border:none;width:100%;height:100%;\" src=\"{origin_link}\"></iframe>"
        ));
    }

    let href_origin = origin.clone();
    let src_origin = origin.clone();
    let srcset_origin = origin.clone();
    let icon_origin = origin.clone();
    let version_origin = origin;

    let mut output = Vec::new();
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                // Hrefs and stylesheet links.
                element!("a[href], link[href]", move |el| {
                    if let Some(value) = el.get_attribute("href") {
                        el.set_attribute("href", &absolutize(&value, &href_origin))?;
                    }
                    Ok(())
                }),
                // Scripts and images.
                element!("script[src], img[src]", move |el| {
                    if let Some(value) = el.get_attribute("src") {
                        el.set_attribute("src", &absolutize(&value, &src_origin))?;
                    }
                    Ok(())
                }),
                // Alternate image sources.
                element!("img[srcset]", move |el| {
                    if let Some(value) = el.get_attribute("srcset") {
                        el.set_attribute("srcset", &absolutize(&value, &srcset_origin))?;
                    }
                    Ok(())
                }),
                element!("img[data-icon]", move |el| {
                    if let Some(value) = el.get_attribute("data-icon") {
                        el.set_attribute("data-icon", &absolutize(&value, &icon_origin))?;
                    }
                    Ok(())
                }),
                // Alternate data payloads.
                element!("div[data-version]", move |el| {
                    if let Some(value) = el.get_attribute("data-version") {
                        el.set_attribute("data-version", &absolutize(&value, &version_origin))?;
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );
    rewriter.write(content.as_bytes())?;
    rewriter.end()?;

    Ok(String::from_utf8(output)?)
}

/// Make one DOM reference absolute. Protocol-relative references get
/// `https:`; root-relative references get the origin; any other relative
/// reference hangs off the origin root; absolute references pass through.
fn absolutize(reference: &str, origin: &str) -> String {
    if reference.starts_with("http") {
        reference.to_string()
    } else if reference.starts_with("//") {
        format!("https:{reference}")
    } else if reference.starts_with('/') {
        format!("{origin}{reference}")
    } else {
        format!("{origin}/{reference}")
    }
}
