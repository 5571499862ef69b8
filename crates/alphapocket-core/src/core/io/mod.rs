//! Reading point clouds from delimited text files.

pub mod points;
