/*
 * SPDX-FileCopyrightText: 2023 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::prelude::*;
use arbitrary::Arbitrary;

const DEBUG: bool = false;

macro_rules! debugln {
    ($($arg:tt)*) => {
        if DEBUG {
            println!($($arg)*);
        }
    };
}

#[derive(Arbitrary, Debug, Clone)]
pub struct FuzzCase {
    capacity: u8,
    commands: Vec<RandomCommand>,
}

#[derive(Arbitrary, Debug, Clone)]
enum RandomCommand {
    Bits(u32, usize),
    SignedBits(i32, usize),
    Align,
    U8(u8),
    I16(i16),
    U32(u32),
    VarU32(u32),
    Half(f32),
    Fixed16(i32),
    Bytes(Vec<u8>),
    String(String),
    Tag(u16, Vec<u8>),
}

/// Write the commands with a big-endian and a little-endian writer, and
/// read them back with readers with a small buffer.
pub fn harness(data: FuzzCase) {
    let mut data = data;
    let capacity = MIN_CAPACITY.max(data.capacity as usize);
    for command in &mut data.commands {
        match command {
            RandomCommand::Bits(value, n_bits) => {
                *n_bits %= 33;
                *value &= low_mask(*n_bits);
            }
            RandomCommand::SignedBits(value, n_bits) => {
                *n_bits = 1 + (*n_bits % 32);
                let shift = 32 - *n_bits as u32;
                *value = (*value << shift) >> shift;
            }
            RandomCommand::String(text) => {
                text.retain(|c| c != '\0');
            }
            RandomCommand::Tag(type_code, _) => {
                *type_code &= MAX_TYPE_CODE;
            }
            _ => {}
        }
    }

    debugln!("{:#4?}", data);

    let mut big = <BufBitWriter<BE, _>>::with_capacity(Vec::new(), capacity);
    let mut little = <BufBitWriter<LE, _>>::with_capacity(Vec::new(), capacity);
    let mut positions = vec![];
    for command in &data.commands {
        write(&mut big, command).unwrap();
        write(&mut little, command).unwrap();
        assert_eq!(BitWrite::bit_pos(&big), BitWrite::bit_pos(&little));
        positions.push(BitWrite::bit_pos(&big));
    }
    let big = big.finish().unwrap();
    let little = little.finish().unwrap();
    assert_eq!(big.len(), little.len());

    let mut big = <BufBitReader<BE, _>>::with_capacity(&big[..], capacity);
    let mut little = <BufBitReader<LE, _>>::with_capacity(&little[..], capacity);
    for (command, pos) in data.commands.iter().zip(positions) {
        read(&mut big, command).unwrap();
        read(&mut little, command).unwrap();
        assert_eq!(BitRead::bit_pos(&big), pos);
        assert_eq!(BitRead::bit_pos(&little), pos);
    }
    big.align_to_byte();
    little.align_to_byte();
    assert!(big.eof().unwrap());
    assert!(little.eof().unwrap());
}

fn write<E: Endianness>(
    writer: &mut impl BitWrite<E>,
    command: &RandomCommand,
) -> Result<(), CodecError> {
    match command {
        RandomCommand::Bits(value, n_bits) => writer.write_bits(*value, *n_bits),
        RandomCommand::SignedBits(value, n_bits) => writer.write_signed_bits(*value, *n_bits),
        RandomCommand::Align => {
            writer.align_to_byte();
            Ok(())
        }
        RandomCommand::U8(value) => writer.write_u8(*value),
        RandomCommand::I16(value) => writer.write_i16(*value),
        RandomCommand::U32(value) => writer.write_u32(*value),
        RandomCommand::VarU32(value) => {
            assert_eq!(writer.write_var_u32(*value)?, len_var_u32(*value));
            Ok(())
        }
        RandomCommand::Half(value) => writer.write_half(*value),
        RandomCommand::Fixed16(value) => writer.write_i32(*value),
        RandomCommand::Bytes(bytes) => writer.write_bytes(bytes),
        RandomCommand::String(text) => {
            let encoding = writer.encoding();
            assert_eq!(writer.write_string(text)?, len_string(encoding, text));
            Ok(())
        }
        RandomCommand::Tag(type_code, body) => encode_tag(
            writer,
            TagHeader::new(*type_code, body.len() as u32),
            |w| w.write_bytes(body),
        ),
    }
}

fn read<E: Endianness>(
    reader: &mut impl BitRead<E>,
    command: &RandomCommand,
) -> Result<(), CodecError> {
    match command {
        RandomCommand::Bits(value, n_bits) => {
            assert_eq!(reader.peek_bits(*n_bits)?, *value);
            assert_eq!(reader.read_bits(*n_bits)?, *value);
        }
        RandomCommand::SignedBits(value, n_bits) => {
            assert_eq!(reader.read_signed_bits(*n_bits)?, *value);
        }
        RandomCommand::Align => reader.align_to_byte(),
        RandomCommand::U8(value) => assert_eq!(reader.read_u8()?, *value),
        RandomCommand::I16(value) => assert_eq!(reader.read_i16()?, *value),
        RandomCommand::U32(value) => assert_eq!(reader.read_u32()?, *value),
        RandomCommand::VarU32(value) => assert_eq!(reader.read_var_u32()?, *value),
        RandomCommand::Half(value) => {
            let expected = half_to_f32(f32_to_half(*value));
            assert_eq!(reader.read_half()?.to_bits(), expected.to_bits());
        }
        RandomCommand::Fixed16(value) => {
            assert_eq!(reader.read_fixed16()?, *value as f64 / 65536.0);
        }
        RandomCommand::Bytes(bytes) => {
            let mut buf = vec![0; bytes.len()];
            reader.read_bytes(&mut buf)?;
            assert_eq!(&buf, bytes);
        }
        RandomCommand::String(text) => assert_eq!(&reader.read_cstring()?, text),
        RandomCommand::Tag(type_code, body) => {
            let (header, data) = decode_tag(reader, |header, r| {
                let mut data = vec![0; header.length as usize];
                r.read_bytes(&mut data)?;
                Ok(data)
            })?;
            assert_eq!(header.type_code, *type_code);
            assert_eq!(header.extended, body.len() > MAX_SHORT_LENGTH as usize);
            assert_eq!(&data, body);
        }
    }
    Ok(())
}
