//! Advisory diagnostics for likely misconfiguration.
//!
//! Nothing here fails: findings are emitted as notices through the context's
//! log sink. Most dual login problems come from cookie settings, so those get
//! checked alongside the registration role of the instance.

use std::sync::Arc;

use super::IntegrationAdmin;
use crate::context::AdminContext;
use crate::locale::keys;
use crate::log::Severity;
use crate::params::Params;

/// Second-level labels that usually sit under a country code
/// (`example.co.uk`, `example.com.au`).
///
/// This is not a public suffix list: suffixes such as `ac.uk` or `gov.au`
/// are classified as plain two-label domains.
const GENERIC_SECOND_LEVEL: [&str; 5] = ["com", "net", "org", "co", "me"];

/// Best-guess cookie domain for a host name.
///
/// Returns the last two labels prefixed by `.`, or the last three when the
/// second-to-last label is one of [`GENERIC_SECOND_LEVEL`] and a third label
/// exists. Host names with fewer than two labels yield `None`.
pub fn canonical_cookie_domain(host: &str) -> Option<String> {
    let labels: Vec<&str> = host.split('.').collect();
    let count = labels.len();
    if count < 2 {
        return None;
    }

    let keep = if count >= 3 && GENERIC_SECOND_LEVEL.contains(&labels[count - 2]) {
        3
    } else {
        2
    };

    Some(format!(".{}", labels[count - keep..].join(".")))
}

/// Log notices about likely misconfiguration of an instance.
///
/// `server_name` is the host name the admin request was served under; the
/// cookie domain is compared against the domain derived from it.
pub async fn debug_config(ctx: &AdminContext, admin: &dyn IntegrationAdmin, server_name: &str) {
    let name = admin.instance().name.as_str();
    let new_registration = admin.allow_registration().await;

    match ctx.store().load(name).await {
        Ok(Some(record)) => {
            if new_registration && record.slave {
                ctx.raise(
                    Severity::Notice,
                    &ctx.text(keys::DISABLE_REGISTRATION),
                    name,
                );
            }
            if !new_registration && record.master {
                ctx.raise(
                    Severity::Notice,
                    &ctx.text(keys::ENABLE_REGISTRATION),
                    name,
                );
            }
        }
        Ok(None) => ctx.raise(Severity::Error, &ctx.text(keys::NO_RECORD), name),
        Err(e) => ctx.raise(Severity::Error, &format!("{e:#}"), name),
    }

    let params = match ctx.params().get(name).await {
        Ok(params) => params,
        Err(e) => {
            ctx.raise(Severity::Error, &format!("{e:#}"), name);
            Arc::new(Params::new())
        }
    };

    if params.is_set("cookie_domain") {
        let cookie_domain = params
            .get_str("cookie_domain")
            .unwrap_or_default()
            .replace("http://", "")
            .replace("https://", "");

        if let Some(correct) = canonical_cookie_domain(server_name) {
            if correct != cookie_domain && !admin.allow_empty_cookie_domain() {
                let message = format!("{} {}", ctx.text(keys::BEST_COOKIE_DOMAIN), correct);
                ctx.raise(Severity::Notice, &message, name);
            }
        }
    }

    // A cookie path other than `/` hides the session from framed pages.
    if params.is_set("cookie_path") {
        let cookie_path = params.get_str("cookie_path").unwrap_or_default();
        if cookie_path != "/" && !admin.allow_empty_cookie_path() {
            let message = format!("{} /", ctx.text(keys::BEST_COOKIE_PATH));
            ctx.raise(Severity::Notice, &message, name);
        }
    }

    admin.debug_config_extra(ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_label_suffix_by_default() {
        assert_eq!(
            canonical_cookie_domain("www.example.de").as_deref(),
            Some(".example.de")
        );
        assert_eq!(
            canonical_cookie_domain("example.com").as_deref(),
            Some(".example.com")
        );
    }

    #[test]
    fn three_labels_under_generic_second_level() {
        assert_eq!(
            canonical_cookie_domain("www.example.co.uk").as_deref(),
            Some(".example.co.uk")
        );
        assert_eq!(
            canonical_cookie_domain("shop.example.com.au").as_deref(),
            Some(".example.com.au")
        );
    }

    #[test]
    fn generic_label_without_third_label() {
        assert_eq!(canonical_cookie_domain("co.uk").as_deref(), Some(".co.uk"));
    }

    #[test]
    fn single_label_hosts_have_no_suggestion() {
        assert_eq!(canonical_cookie_domain("localhost"), None);
    }

    #[test]
    fn unlisted_multi_part_suffix_is_misclassified() {
        // Known limitation of the short list.
        assert_eq!(
            canonical_cookie_domain("www.example.ac.uk").as_deref(),
            Some(".ac.uk")
        );
    }
}
