#![doc = include_str!("../README.md")]

mod config;
mod error;
mod hasher;
mod hashring;
mod node;
mod ring;
mod shared;
mod vnode;

pub use config::{Config, DEFAULT_REPLICAS};
pub use error::{Error, Result};
pub use hasher::{Crc32Hasher, KeyHasher, Sha1Hasher};
pub use hashring::HashRing;
pub use node::Node;
pub use shared::SharedHashRing;
