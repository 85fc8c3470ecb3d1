// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod envelope;
pub mod identity;
pub mod role;
pub mod session;
