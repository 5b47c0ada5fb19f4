//! Reader adapters
//!
//! Shims that present one reader through a different library interface
//! without adding decoding logic of their own.

use rxing::multi::MultipleBarcodeReader;
use rxing::{
    Binarizer, BinaryBitmap, DecodeHints, Exceptions, MultiFormatReader, RXingResult, Reader,
};

type Result<T> = std::result::Result<T, Exceptions>;

/// Presents a [`MultiFormatReader`] as a plain [`Reader`], always going
/// through `decode_with_state` so the configured readers are reused instead
/// of being rebuilt from hints on every call.
///
/// Hints passed per call are ignored; the wrapped reader was configured
/// when it was built.
pub struct MultiFormatReaderAdapter<'a> {
    reader: &'a mut MultiFormatReader,
}

impl<'a> MultiFormatReaderAdapter<'a> {
    pub fn new(reader: &'a mut MultiFormatReader) -> Self {
        Self { reader }
    }
}

impl Reader for MultiFormatReaderAdapter<'_> {
    fn decode<B: Binarizer>(&mut self, image: &mut BinaryBitmap<B>) -> Result<RXingResult> {
        self.reader.decode_with_state(image)
    }

    fn decode_with_hints<B: Binarizer>(
        &mut self,
        image: &mut BinaryBitmap<B>,
        _hints: &DecodeHints,
    ) -> Result<RXingResult> {
        self.reader.decode_with_state(image)
    }

    fn reset(&mut self) {
        self.reader.reset();
    }
}

/// Presents a single-result [`Reader`] as a [`MultipleBarcodeReader`].
///
/// The wrapped reader runs once, so at most one result comes back. Not
/// found becomes an empty list; every other error is passed through.
pub struct SingleResultMultipleReader<R> {
    reader: R,
}

impl<R: Reader> SingleResultMultipleReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Reader> MultipleBarcodeReader for SingleResultMultipleReader<R> {
    fn decode_multiple<B: Binarizer>(
        &mut self,
        image: &mut BinaryBitmap<B>,
    ) -> Result<Vec<RXingResult>> {
        wrap_single(self.reader.decode(image))
    }

    fn decode_multiple_with_hints<B: Binarizer>(
        &mut self,
        image: &mut BinaryBitmap<B>,
        hints: &DecodeHints,
    ) -> Result<Vec<RXingResult>> {
        wrap_single(self.reader.decode_with_hints(image, hints))
    }
}

fn wrap_single(outcome: Result<RXingResult>) -> Result<Vec<RXingResult>> {
    match outcome {
        Ok(result) => Ok(vec![result]),
        Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::luminance::LumaPlane;
    use crate::testing::{bitmap, blank_plane, qr_plane, two_qr_plane};

    /// Reader that replays a fixed outcome and counts calls.
    struct Scripted {
        outcome: fn() -> Result<RXingResult>,
        calls: usize,
    }

    impl Reader for Scripted {
        fn decode<B: Binarizer>(&mut self, _image: &mut BinaryBitmap<B>) -> Result<RXingResult> {
            self.calls += 1;
            (self.outcome)()
        }

        fn decode_with_hints<B: Binarizer>(
            &mut self,
            image: &mut BinaryBitmap<B>,
            _hints: &DecodeHints,
        ) -> Result<RXingResult> {
            self.decode(image)
        }
    }

    fn blank() -> LumaPlane {
        blank_plane(64, 64)
    }

    #[test]
    fn adapter_matches_the_wrapped_reader() {
        let plane = qr_plane("HELLO", 320, 240);

        let mut direct = MultiFormatReader::default();
        let expected = direct.decode_with_state(&mut bitmap(&plane)).unwrap();

        let mut wrapped = MultiFormatReader::default();
        let mut adapter = MultiFormatReaderAdapter::new(&mut wrapped);
        let got = adapter.decode(&mut bitmap(&plane)).unwrap();
        let got_hinted = adapter
            .decode_with_hints(&mut bitmap(&plane), &DecodeHints::default())
            .unwrap();

        assert_eq!(got.getText(), expected.getText());
        assert_eq!(got.getBarcodeFormat(), expected.getBarcodeFormat());
        assert_eq!(got.getPoints(), expected.getPoints());
        assert_eq!(got_hinted.getText(), expected.getText());
    }

    #[test]
    fn adapter_propagates_not_found() {
        let mut wrapped = MultiFormatReader::default();
        let mut adapter = MultiFormatReaderAdapter::new(&mut wrapped);
        assert!(matches!(
            adapter.decode(&mut bitmap(&blank())),
            Err(Exceptions::NotFoundException(_))
        ));
    }

    #[test]
    fn single_result_is_wrapped_once() {
        let plane = qr_plane("ONE", 320, 240);
        let mut wrapped = MultiFormatReader::default();
        let mut multi = SingleResultMultipleReader::new(MultiFormatReaderAdapter::new(&mut wrapped));

        let results = multi.decode_multiple(&mut bitmap(&plane)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].getText(), "ONE");
    }

    #[test]
    fn not_found_becomes_empty() {
        let mut multi = SingleResultMultipleReader::new(Scripted {
            outcome: || Err(Exceptions::NotFoundException(String::new())),
            calls: 0,
        });
        let results = multi
            .decode_multiple_with_hints(&mut bitmap(&blank()), &DecodeHints::default())
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(multi.into_inner().calls, 1);
    }

    #[test]
    fn other_errors_pass_through() {
        let mut multi = SingleResultMultipleReader::new(Scripted {
            outcome: || Err(Exceptions::FormatException("bad".to_owned())),
            calls: 0,
        });
        assert!(matches!(
            multi.decode_multiple(&mut bitmap(&blank())),
            Err(Exceptions::FormatException(_))
        ));
    }

    #[test]
    fn never_more_than_one_result() {
        // two codes side by side, still a single answer
        let plane = two_qr_plane("LEFT", "RIGHT", 640, 240);
        let mut wrapped = MultiFormatReader::default();
        let mut multi = SingleResultMultipleReader::new(MultiFormatReaderAdapter::new(&mut wrapped));
        let results = multi
            .decode_multiple(&mut bitmap(&plane))
            .expect("a code side by side with another still decodes");
        assert_eq!(results.len(), 1);
        assert!(["LEFT", "RIGHT"].contains(&results[0].getText()));
    }
}
