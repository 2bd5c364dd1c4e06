// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: rotation, white padding, filled cropping and encoding,
// preserving the scan's colour type and bit depth.

pub mod processor;

pub use processor::ImageProcessor;
