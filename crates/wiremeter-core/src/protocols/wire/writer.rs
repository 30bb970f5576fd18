use super::reader::WireType;

/// Encoding mirror of [`super::WireReader`].
///
/// The pipeline only ever observes traffic; this writer exists for tests
/// and the capture synthesizer, which need to produce byte-exact message
/// bodies.
#[derive(Debug, Default)]
pub struct WireWriter {
    out: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn varint(&mut self, mut value: u64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.out.push(byte);
                return self;
            }
            self.out.push(byte | 0x80);
        }
    }

    pub fn key(&mut self, field: u32, wire_type: WireType) -> &mut Self {
        let raw = match wire_type {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        };
        self.varint((u64::from(field) << 3) | raw)
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.varint(value.len() as u64);
        self.out.extend_from_slice(value);
        self
    }

    pub fn fixed32(&mut self, value: u32) -> &mut Self {
        self.out.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn fixed64(&mut self, value: u64) -> &mut Self {
        self.out.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.fixed32(value.to_bits())
    }

    pub fn sint32(&mut self, value: i32) -> &mut Self {
        let zigzag = ((value << 1) ^ (value >> 31)) as u32;
        self.varint(u64::from(zigzag))
    }

    /// Field helpers: key plus value in one call.
    pub fn field_varint(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, WireType::Varint).varint(value)
    }

    pub fn field_bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        self.key(field, WireType::LengthDelimited).bytes(value)
    }

    pub fn field_string(&mut self, field: u32, value: &str) -> &mut Self {
        self.field_bytes(field, value.as_bytes())
    }

    pub fn field_f32(&mut self, field: u32, value: f32) -> &mut Self {
        self.key(field, WireType::Fixed32).f32(value)
    }

    pub fn field_sint32(&mut self, field: u32, value: i32) -> &mut Self {
        self.key(field, WireType::Varint).sint32(value)
    }

    /// Nested message: encoded body as a length-delimited field.
    pub fn field_message(&mut self, field: u32, body: &WireWriter) -> &mut Self {
        self.field_bytes(field, &body.out)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }
}
