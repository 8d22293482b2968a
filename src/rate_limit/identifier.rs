//! Best-effort caller fingerprints for admission checks.
//!
//! Both headers are client-controlled and trivially spoofed. The derived identifier is good
//! enough to throttle abuse but must never back an authorization decision.

/// Identifier used when no address information is available.
pub const UNKNOWN_CLIENT: &str = "unknown";
/// Header listing the client address followed by every proxy hop.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
/// Header carrying the address seen by the closest proxy.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Derives a rate-limit key from the forwarded-address list and the real-address value.
///
/// Picks the first entry of `forwarded_for`, then `real_ip`, then [`UNKNOWN_CLIENT`]. Blank
/// values are skipped.
pub fn client_identifier(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
	forwarded_for
		.and_then(|list| list.split(',').next())
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.or_else(|| real_ip.map(str::trim).filter(|value| !value.is_empty()))
		.unwrap_or(UNKNOWN_CLIENT)
		.to_owned()
}

/// Same as [`client_identifier`], reading header pairs with case-insensitive names.
///
/// The first occurrence of each header wins.
pub fn client_identifier_from_headers<'a, I>(headers: I) -> String
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let mut forwarded_for = None;
	let mut real_ip = None;

	for (name, value) in headers {
		if forwarded_for.is_none() && name.eq_ignore_ascii_case(FORWARDED_FOR_HEADER) {
			forwarded_for = Some(value);
		} else if real_ip.is_none() && name.eq_ignore_ascii_case(REAL_IP_HEADER) {
			real_ip = Some(value);
		}
	}

	client_identifier(forwarded_for, real_ip)
}
