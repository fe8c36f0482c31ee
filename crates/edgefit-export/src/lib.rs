//! edgefit-export: Pure format serializers (sans-IO)
//!
//! Converts pipeline output into viewable formats. Currently supports an
//! SVG overlay of fitted curves on their simplified edge paths.

pub mod svg;

pub use svg::{FIT_COLORS, GUIDE_COLOR, SvgMetadata, build_path_data, fit_color, to_overlay_svg};
