use savestate::{
    load_state, read_header, save_state, DoState, FormatVersion, IoStream, MemoryStream, Mode,
    Result, SliceStream, StateEnum, StateError, StateWrapper, VersionedField, SAVE_STATE_MAGIC,
};

const FORMAT: FormatVersion = FormatVersion::new(3, 2);

/// Interrupt line `mask` was added in format version 3.
const MASK: VersionedField<u8> = VersionedField::new(3, 0xFF);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TriggerMode {
    #[default]
    Edge,
    Level,
}

impl StateEnum for TriggerMode {
    type Repr = u8;

    fn to_repr(self) -> u8 {
        self as u8
    }

    fn from_repr(repr: u8) -> Option<Self> {
        match repr {
            0 => Some(TriggerMode::Edge),
            1 => Some(TriggerMode::Level),
            _ => None,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Pic {
    irr: u8,
    isr: u8,
    mask: u8,
    trigger: TriggerMode,
    pending: Vec<u8>,
}

#[derive(Debug, Default, PartialEq)]
struct Machine {
    cycles: u64,
    halted: bool,
    model: String,
    pic: Pic,
}

impl DoState for Pic {
    fn do_state(&mut self, sw: &mut StateWrapper<'_>) -> Result<()> {
        sw.expect_marker("PIC")?;
        sw.do_value(&mut self.irr);
        sw.do_value(&mut self.isr);
        sw.do_field(&mut self.mask, &MASK);
        sw.do_enum(&mut self.trigger);
        sw.do_value(&mut self.pending);
        if sw.is_reading() && self.pending.len() > 8 {
            sw.set_error("too many pending interrupts");
        }
        Ok(())
    }
}

impl DoState for Machine {
    fn do_state(&mut self, sw: &mut StateWrapper<'_>) -> Result<()> {
        sw.expect_marker("MACHINE")?;
        sw.do_value(&mut self.cycles);
        sw.do_bool(&mut self.halted);
        sw.do_string(&mut self.model);
        self.pic.do_state(sw)?;
        sw.expect_marker("END")
    }
}

fn machine() -> Machine {
    Machine {
        cycles: 123_456_789,
        halted: true,
        model: "pc-i440fx".to_string(),
        pic: Pic {
            irr: 0x01,
            isr: 0x80,
            mask: 0xFB,
            trigger: TriggerMode::Level,
            pending: vec![0x20, 0x21],
        },
    }
}

#[test]
fn save_then_load_restores_everything() {
    let mut stream = MemoryStream::new();
    let mut original = machine();
    save_state(&mut stream, FORMAT, &mut original).unwrap();

    stream.rewind();
    let mut restored = Machine::default();
    let version = load_state(&mut stream, FORMAT, &mut restored).unwrap();
    assert_eq!(version, 3);
    assert_eq!(restored, original);
}

#[test]
fn header_is_magic_then_version() {
    let mut stream = MemoryStream::new();
    save_state(&mut stream, FORMAT, &mut machine()).unwrap();
    let bytes = stream.as_slice();
    assert_eq!(&bytes[..8], SAVE_STATE_MAGIC);
    assert_eq!(&bytes[8..12], &3u32.to_ne_bytes());
    assert_eq!(read_header(&mut SliceStream::new(bytes)), Ok(3));
}

#[test]
fn loads_older_supported_version_with_defaults() {
    // Format version 2 predates the PIC mask field.
    let mut stream = MemoryStream::new();
    let mut sw = StateWrapper::new(&mut stream, Mode::Write, 2);
    let mut magic = *SAVE_STATE_MAGIC;
    sw.do_bytes(&mut magic);
    sw.do_value(&mut 2u32);
    sw.do_str("MACHINE");
    sw.do_value(&mut 99u64);
    sw.do_bool(&mut false);
    sw.do_str("isa");
    sw.do_str("PIC");
    sw.do_value(&mut 0x02u8);
    sw.do_value(&mut 0x00u8);
    sw.do_value(&mut 1u8);
    sw.do_value(&mut vec![0x30u8]);
    sw.do_str("END");
    sw.finish().unwrap();

    stream.rewind();
    let mut restored = Machine::default();
    assert_eq!(load_state(&mut stream, FORMAT, &mut restored), Ok(2));
    assert_eq!(restored.cycles, 99);
    assert_eq!(restored.model, "isa");
    assert_eq!(restored.pic.irr, 0x02);
    assert_eq!(restored.pic.mask, MASK.default);
    assert_eq!(restored.pic.trigger, TriggerMode::Level);
    assert_eq!(restored.pic.pending, vec![0x30]);
}

#[test]
fn rejects_versions_outside_the_supported_range() {
    for written in [1, 4] {
        let mut stream = MemoryStream::new();
        save_state(&mut stream, FormatVersion::new(written, 0), &mut machine()).unwrap();
        stream.rewind();
        let err = load_state(&mut stream, FORMAT, &mut Machine::default()).unwrap_err();
        assert_eq!(
            err,
            StateError::UnsupportedVersion {
                found: written,
                minimum: 2,
                current: 3
            }
        );
    }
}

#[test]
fn truncated_save_state_fails_to_load() {
    let mut stream = MemoryStream::new();
    save_state(&mut stream, FORMAT, &mut machine()).unwrap();
    let bytes = stream.into_inner();

    let mut restored = Machine::default();
    let err = load_state(
        &mut SliceStream::new(&bytes[..bytes.len() - 3]),
        FORMAT,
        &mut restored,
    )
    .unwrap_err();
    assert!(err.is_stream());
}

#[test]
fn semantic_check_rejects_the_load() {
    let mut stream = MemoryStream::new();
    let mut big = machine();
    big.pic.pending = (0..16).collect();
    save_state(&mut stream, FORMAT, &mut big).unwrap();

    stream.rewind();
    let err = load_state(&mut stream, FORMAT, &mut Machine::default()).unwrap_err();
    assert_eq!(err, StateError::Invalid("too many pending interrupts"));
}

#[test]
fn save_state_through_a_file() {
    let file = tempfile::tempfile().unwrap();
    let mut stream = IoStream::new(file);
    let mut original = machine();
    save_state(&mut stream, FORMAT, &mut original).unwrap();

    use std::io::Seek as _;
    stream.get_mut().rewind().unwrap();
    let mut restored = Machine::default();
    load_state(&mut stream, FORMAT, &mut restored).unwrap();
    assert_eq!(restored, original);
}
