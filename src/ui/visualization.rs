pub mod audio_stream;
pub mod ribbon;
pub mod ticker;

pub use audio_stream::MagnitudeSubscription;
pub use ribbon::{RibbonState, widget as ribbon_widget};
pub use ticker::SpriteTicker;
