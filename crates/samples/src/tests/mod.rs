mod error_demo;
mod gallery;
