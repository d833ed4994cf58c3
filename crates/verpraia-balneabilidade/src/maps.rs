//! Map links for the "nearest beach" shortcut.
//!
//! Only the URLs are built here. Asking for location permission, probing
//! which scheme the device can open and opening it belong to the host app,
//! which should try the links in order and stop at the first that opens.

use crate::types::Coordinates;

/// Public site of the monitoring agency.
pub const AGENCY_SITE_URL: &str = "https://balneabilidade.ima.sc.gov.br/";

/// Generic search used when the device position is unavailable.
pub const NEARBY_BEACHES_SEARCH_URL: &str =
    "https://www.google.com/maps/search/praias+perto+de+mim";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    Ios,
    /// Android and anything else that understands `geo:` URIs.
    #[default]
    Android,
}

/// Candidate map URLs for beaches around `position`, most specific first.
pub fn nearest_beach_links(platform: Platform, position: Option<Coordinates>) -> Vec<String> {
    let Some(position) = position else {
        return vec![NEARBY_BEACHES_SEARCH_URL.to_string()];
    };

    let lat = format!("{:.6}", position.latitude);
    let lng = format!("{:.6}", position.longitude);
    let google_app = format!("comgooglemaps://?q=Praias&center={lat},{lng}&zoom=12");

    let mut links = match platform {
        Platform::Ios => vec![google_app, format!("maps://?q=Praias&ll={lat},{lng}")],
        Platform::Android => vec![format!("geo:{lat},{lng}?q=Praias"), google_app],
    };

    links.push(format!(
        "https://www.google.com/maps/search/Praias/@{lat},{lng},12z"
    ));
    links
}
