pub mod feature;
pub mod global;
pub mod pooling;
pub mod traits;
pub mod upscale;

pub use feature::{FeaturePoolLayer, FeatureWTALayer};
pub use global::GlobalPoolLayer;
pub use pooling::{Pool1DLayer, Pool2DLayer, Pool2DLayerBuilder, Pool3DLayer, PoolMode};
pub use traits::Layer;
pub use upscale::{Upscale1DLayer, Upscale2DLayer, Upscale3DLayer, UpscaleMode};
