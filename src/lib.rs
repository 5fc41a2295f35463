//! Neoncity library - audio-reactive procedural skyline

pub mod analyzer;
pub mod animator;
pub mod audio;
pub mod camera;
pub mod city;
pub mod cli;
pub mod config;
pub mod params;
pub mod render;
