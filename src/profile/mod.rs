//! Profile normalizer — shapes raw form input into a canonical [`Profile`].
//!
//! No network I/O happens here. The only cross-field rule is birth date →
//! zodiac; everything else is a straight replacement.

pub mod image;
pub mod model;
pub mod zodiac;

pub use image::InlineImage;
pub use model::{Profile, ProfileEdit};
pub use zodiac::zodiac_for_date;
