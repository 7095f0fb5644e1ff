#![cfg(test)]

mod interfaces;
mod util;
