//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use derivative::Derivative;
pub use futures::{
    future::FutureExt as _,
    stream::{self, BoxStream, StreamExt as _},
};
pub use image::{imageops::FilterType, DynamicImage, ImageBuffer, Luma, Pixel, RgbImage};
pub use itertools::Itertools as _;
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt::{self, Debug, Display},
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
pub use tch::{Kind, Tensor};
pub use tracing::{debug, info, trace_span, warn};

pub type Fallible<T> = Result<T, Error>;

unzip_n::unzip_n!(pub 5);
