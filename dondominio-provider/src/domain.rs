//! Challenge FQDN splitting
//!
//! The registrable domain is always the last two labels. There is no
//! public-suffix awareness, so a name under `co.uk` resolves to `co.uk`.

/// Strips one trailing dot.
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Returns the last two labels of `fqdn`.
///
/// With fewer than two dots the whole (trailing-dot-stripped) name is returned.
///
/// ```
/// use dondominio_provider::get_domain;
///
/// assert_eq!(get_domain("foo.bar.example.com."), "example.com");
/// assert_eq!(get_domain("example.com"), "example.com");
/// ```
pub fn get_domain(fqdn: &str) -> &str {
    let domain = un_fqdn(fqdn);
    match domain.rmatch_indices('.').nth(1) {
        Some((idx, _)) => &domain[idx + 1..],
        None => domain,
    }
}

/// Returns the part of `fqdn` in front of `".{domain}"`.
///
/// When `".{domain}"` does not occur (the FQDN is the zone apex) the
/// trailing-dot-stripped FQDN comes back unchanged.
pub fn get_sub_domain<'a>(domain: &str, fqdn: &'a str) -> &'a str {
    match fqdn.find(&format!(".{domain}")) {
        Some(idx) => &fqdn[..idx],
        None => un_fqdn(fqdn),
    }
}
