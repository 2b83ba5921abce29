// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

mod ed25519_test;
mod hash_test;
