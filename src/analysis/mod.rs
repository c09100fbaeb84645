pub mod cocktail;
pub mod efficiency;
pub mod fit;
pub mod mtinfo;
pub mod smear;
