pub(crate) mod rawg;
pub(crate) mod steam;
pub(crate) mod translate;
pub(crate) mod youtube;
