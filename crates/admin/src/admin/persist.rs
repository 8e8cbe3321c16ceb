//! Parameter persistence.

use std::path::{MAIN_SEPARATOR, Path};

use anyhow::{Result, bail};
use tracing::info;

use super::IntegrationAdmin;
use crate::context::AdminContext;
use crate::locale::keys;
use crate::log::Severity;
use crate::params::Params;

/// Normalize a source URL: one trailing `/`, and `http://` in front of
/// anything that is neither absolute nor root-relative.
pub fn normalize_source_url(url: &str) -> String {
    let mut url = url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with('/') {
        url.insert_str(0, "http://");
    }
    url
}

/// Normalize a source path to end with the platform path separator.
pub fn normalize_source_path(path: &str) -> String {
    let mut path = path.to_string();
    if !path.ends_with(MAIN_SEPARATOR) {
        path.push(MAIN_SEPARATOR);
    }
    path
}

/// Normalize and store submitted parameters for an instance.
///
/// With `wizard` set, the submission is merged over the stored params
/// instead of replacing them. Failures are logged at error level against the
/// instance and reported only as `false`.
pub async fn save_parameters(
    ctx: &AdminContext,
    admin: &dyn IntegrationAdmin,
    post: Params,
    wizard: bool,
) -> bool {
    let name = admin.instance().name.as_str();
    if name.is_empty() {
        return false;
    }

    match persist(ctx, name, post, wizard).await {
        Ok(()) => true,
        Err(e) => {
            ctx.raise(Severity::Error, &format!("{e:#}"), name);
            false
        }
    }
}

async fn persist(ctx: &AdminContext, name: &str, mut post: Params, wizard: bool) -> Result<()> {
    if let Some(url) = post.get_str("source_url") {
        post.set("source_url", normalize_source_url(&url));
    }

    if let Some(path) = post.get_non_empty("source_path") {
        let path = normalize_source_path(&path);
        if !Path::new(&path).is_dir() {
            ctx.raise(
                Severity::Warning,
                &ctx.text(keys::SOURCE_PATH_NOT_FOUND),
                name,
            );
        }
        post.set("source_path", path);
    }

    let params = if wizard {
        let existing = ctx
            .store()
            .load_params(name)
            .await?
            .map(|raw| Params::parse(&raw))
            .unwrap_or_default();
        post.merged_over(existing)
    } else {
        post
    };

    if !ctx.store().update_params(name, &params.to_json()).await? {
        bail!("{}: {name}", ctx.text(keys::NO_RECORD));
    }

    ctx.params().reset(name).await;

    info!(instance = %name, keys = params.len(), wizard, "integration params saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_url_gets_scheme_and_slash() {
        assert_eq!(normalize_source_url("example.com"), "http://example.com/");
        assert_eq!(
            normalize_source_url("https://example.com/forum"),
            "https://example.com/forum/"
        );
        assert_eq!(
            normalize_source_url("http://example.com/"),
            "http://example.com/"
        );
    }

    #[test]
    fn root_relative_source_url_keeps_no_scheme() {
        assert_eq!(normalize_source_url("/forum"), "/forum/");
        assert_eq!(normalize_source_url(""), "/");
    }

    #[test]
    fn source_path_gets_one_separator() {
        let expected = format!("/opt/app{MAIN_SEPARATOR}");
        assert_eq!(normalize_source_path("/opt/app"), expected);
        assert_eq!(normalize_source_path(&expected), expected);
    }
}
