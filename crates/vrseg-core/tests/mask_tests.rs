// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]

use proptest::prelude::*;
use vrseg_core::VertexLabelMask;

proptest! {
    #[test]
    fn set_range_keeps_length_and_last_write_wins(
        n in 1usize..200,
        writes in prop::collection::vec((0usize..400, -1i32..8), 0..300),
    ) {
        let mut mask = VertexLabelMask::new(n);
        let mut expected = vec![-1; n];
        for &(i, v) in &writes {
            if i < n {
                expected[i] = v;
            }
        }
        let report = mask.set_range(writes.iter().copied());
        prop_assert_eq!(mask.len(), n);
        prop_assert_eq!(mask.as_slice(), &expected[..]);
        prop_assert_eq!(report.written + report.skipped, writes.len());
    }
}
