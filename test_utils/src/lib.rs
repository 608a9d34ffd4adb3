// SPDX-License-Identifier: MIT

pub mod observers;
pub mod reference;
