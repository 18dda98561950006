//! Annotation overlays for repair-diagnosis photos.
//!
//! Annotations arrive in a 0..1000 grid on both axes and are drawn onto a
//! surface of any size. Each render pass clears the surface and repaints
//! every annotation in list order.

pub mod annotation;
pub mod diagnosis;
pub mod font;
pub mod label;
pub mod layer;
pub mod mapper;
pub mod raster;
pub mod session;
pub mod settings;
pub mod shape;
pub mod surface;
pub mod theme;

pub use annotation::{Annotation, AnnotationSet, AnnotationType, BoxCoords, Rejection, Shape};
pub use layer::{render_pass, AnnotationLayer, RenderStats};
pub use mapper::{to_pixel, Point, Scale, Viewport};
pub use surface::{DrawCall, DrawDefaults, PixelRect, RecordingSurface, Surface};
pub use theme::{overlay_theme, OverlayTheme};
