#![allow(dead_code)]

pub mod summarizer;
pub mod youtube;
