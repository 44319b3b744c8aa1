#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

// Arbitrary wire bytes must never panic the frame reader, and any decoded
// frame must re-encode to a prefix of the input.
fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor::new(data);
    if let Ok(payload) = secure_channel::framing::read_frame(&mut cursor) {
        let frame = secure_channel::framing::encode_frame(&payload).expect("fits u16");
        assert_eq!(&data[..frame.len()], &frame[..]);
    }
});
