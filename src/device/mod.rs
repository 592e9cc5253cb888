// SPDX-License-Identifier: Unlicense

//! A module for devices.

pub mod uart;
