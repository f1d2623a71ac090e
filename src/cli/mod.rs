pub(crate) mod contacts;
pub(crate) mod pore;
pub(crate) mod run;
pub(crate) mod surface;
