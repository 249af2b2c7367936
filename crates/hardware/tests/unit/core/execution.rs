//! Instruction semantics tests.
//!
//! Programs are assembled with the `encode` helpers, placed at the bottom of
//! DRAM, and run through the real fetch path so PC handling is exercised too.

use pretty_assertions::assert_eq;

use crate::common::encode::{self, *};
use crate::common::{machine, machine_with_program, run, DRAM_BASE};
use rv32virt_core::common::Trap;
use rv32virt_core::core::arch::csr::MSCRATCH;

#[test]
fn addi_and_register_arithmetic() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 5),
        addi(2, 0, -3),
        add(3, 1, 2),
        sub(4, 1, 2),
    ]);
    run(&mut emu, 4);
    assert_eq!(emu.cpu.read_reg(1), 5);
    assert_eq!(emu.cpu.read_reg(2), (-3i32) as u32);
    assert_eq!(emu.cpu.read_reg(3), 2);
    assert_eq!(emu.cpu.read_reg(4), 8);
}

#[test]
fn writes_to_x0_are_dropped() {
    let mut emu = machine_with_program(&[addi(0, 0, 123), add(1, 0, 0)]);
    run(&mut emu, 2);
    assert_eq!(emu.cpu.read_reg(0), 0);
    assert_eq!(emu.cpu.read_reg(1), 0);
}

#[test]
fn arithmetic_wraps_modulo_two_pow_32() {
    let mut emu = machine_with_program(&[
        lui(1, 0xFFFF_F000),
        addi(2, 1, 0x7FF), // x2 = 0xFFFF_F7FF
        add(3, 2, 2),
    ]);
    run(&mut emu, 3);
    assert_eq!(emu.cpu.read_reg(2), 0xFFFF_F7FF);
    assert_eq!(emu.cpu.read_reg(3), 0xFFFF_EFFE, "sum wrapped past 2^32");
}

#[test]
fn logic_and_comparison_ops() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 0b1100),
        addi(2, 0, 0b1010),
        and(3, 1, 2),
        or(4, 1, 2),
        xor(5, 1, 2),
        slt(6, 2, 1),
        sltu(7, 1, 2),
        slti(8, 1, -1),
        sltiu(9, 0, 1),
    ]);
    run(&mut emu, 9);
    assert_eq!(emu.cpu.read_reg(3), 0b1000);
    assert_eq!(emu.cpu.read_reg(4), 0b1110);
    assert_eq!(emu.cpu.read_reg(5), 0b0110);
    assert_eq!(emu.cpu.read_reg(6), 1);
    assert_eq!(emu.cpu.read_reg(7), 0);
    assert_eq!(emu.cpu.read_reg(8), 0, "positive not below -1 signed");
    assert_eq!(emu.cpu.read_reg(9), 1, "zero below one unsigned");
}

#[test]
fn shifts_mask_amount_to_five_bits() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 1),
        addi(2, 0, 33), // shift amount 33 & 0x1F = 1
        sll(3, 1, 2),
        addi(4, 0, -8),
        sra(5, 4, 1), // arithmetic: sign fills
        srl(6, 4, 1), // logical: zero fills
        srai(7, 4, 2),
        srli(8, 4, 2),
        slli(9, 1, 31),
    ]);
    run(&mut emu, 9);
    assert_eq!(emu.cpu.read_reg(3), 2);
    assert_eq!(emu.cpu.read_reg(5), (-4i32) as u32);
    assert_eq!(emu.cpu.read_reg(6), 0x7FFF_FFFC);
    assert_eq!(emu.cpu.read_reg(7), (-2i32) as u32);
    assert_eq!(emu.cpu.read_reg(8), 0x3FFF_FFFE);
    assert_eq!(emu.cpu.read_reg(9), 0x8000_0000);
}

#[test]
fn lui_and_auipc() {
    let mut emu = machine_with_program(&[lui(1, 0xABCD_E000), auipc(2, 0x1000)]);
    run(&mut emu, 2);
    assert_eq!(emu.cpu.read_reg(1), 0xABCD_E000);
    assert_eq!(emu.cpu.read_reg(2), DRAM_BASE + 4 + 0x1000, "auipc is pc-relative");
}

#[test]
fn branches_taken_and_not_taken() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 1),
        beq(1, 0, 8), // not taken
        bne(1, 0, 8), // taken, skips the next slot
        addi(2, 0, 99),
        addi(3, 0, 7),
    ]);
    run(&mut emu, 4);
    assert_eq!(emu.cpu.read_reg(2), 0, "skipped instruction never ran");
    assert_eq!(emu.cpu.read_reg(3), 7);
}

#[test]
fn signed_and_unsigned_branch_compare() {
    // -1 signed is u32::MAX unsigned; blt and bltu disagree on it.
    let mut emu = machine_with_program(&[
        addi(1, 0, -1),
        blt(1, 0, 8), // taken: -1 < 0 signed
        addi(2, 0, 1),
        bltu(1, 0, 8), // not taken: MAX > 0 unsigned
        addi(3, 0, 1),
        bgeu(1, 0, 8), // taken
        addi(4, 0, 1),
        nop(),
    ]);
    run(&mut emu, 5);
    assert_eq!(emu.cpu.read_reg(2), 0);
    assert_eq!(emu.cpu.read_reg(3), 1);
    assert_eq!(emu.cpu.read_reg(4), 0);
}

#[test]
fn jal_links_and_jumps() {
    let mut emu = machine_with_program(&[
        jal(1, 12), // to slot 3
        addi(2, 0, 1),
        addi(3, 0, 1),
        addi(4, 0, 9),
    ]);
    run(&mut emu, 2);
    assert_eq!(emu.cpu.read_reg(1), DRAM_BASE + 4, "link is pc + 4");
    assert_eq!(emu.cpu.read_reg(2), 0);
    assert_eq!(emu.cpu.read_reg(4), 9);
}

#[test]
fn jalr_clears_target_low_bit() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 13), // 13 & !1 = 12 -> slot 3 relative to DRAM base
        lui(2, 0x8000_0000),
        add(1, 1, 2),
        jalr(5, 1, 0),
        addi(6, 0, 1),
    ]);
    // x1 = DRAM_BASE + 13; jalr target drops the low bit.
    run(&mut emu, 4);
    assert_eq!(emu.cpu.pc, DRAM_BASE + 12);
    assert_eq!(emu.cpu.read_reg(5), DRAM_BASE + 16);
}

#[test]
fn misaligned_jump_target_is_fatal() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 6),
        lui(2, 0x8000_0000),
        add(1, 1, 2),
        jalr(0, 1, 0), // target = DRAM_BASE + 6: not 4-byte aligned
    ]);
    run(&mut emu, 3);
    match emu.step() {
        Err(Trap::InstructionAddressMisaligned(addr)) => {
            assert_eq!(addr, u64::from(DRAM_BASE + 6));
        }
        other => panic!("expected fatal misaligned trap, got {other:?}"),
    }
}

#[test]
fn loads_and_stores_round_trip_memory() {
    let mut emu = machine_with_program(&[
        lui(1, 0x8000_1000),
        addi(2, 0, -2),              // 0xFFFF_FFFE
        sw(1, 2, 0),
        lw(3, 1, 0),
        lb(4, 1, 0),
        lbu(5, 1, 0),
        lh(6, 1, 0),
        lhu(7, 1, 0),
    ]);
    run(&mut emu, 8);
    assert_eq!(emu.cpu.read_reg(3), 0xFFFF_FFFE);
    assert_eq!(emu.cpu.read_reg(4), 0xFFFF_FFFE, "lb sign-extends");
    assert_eq!(emu.cpu.read_reg(5), 0xFE, "lbu zero-extends");
    assert_eq!(emu.cpu.read_reg(6), 0xFFFF_FFFE, "lh sign-extends");
    assert_eq!(emu.cpu.read_reg(7), 0xFFFE, "lhu zero-extends");
}

#[test]
fn byte_and_half_stores_are_little_endian() {
    let mut emu = machine_with_program(&[
        lui(1, 0x8000_1000),
        addi(2, 0, 0x41),
        sb(1, 2, 0),
        addi(3, 0, 0x7B2),
        sh(1, 3, 2),
    ]);
    run(&mut emu, 5);
    assert_eq!(emu.cpu.bus.load(0x8000_1000, 8).unwrap(), 0x41);
    assert_eq!(emu.cpu.bus.load(0x8000_1002, 16).unwrap(), 0x7B2);
    assert_eq!(emu.cpu.bus.load(0x8000_1002, 8).unwrap(), 0xB2, "low byte first");
    assert_eq!(emu.cpu.bus.load(0x8000_1003, 8).unwrap(), 0x07);
}

#[test]
fn mul_and_mulh_variants() {
    let mut emu = machine_with_program(&[
        addi(1, 0, -2),
        addi(2, 0, 3),
        muldiv(3, 0b000, 1, 2), // mul
        muldiv(4, 0b001, 1, 2), // mulh
        muldiv(5, 0b011, 2, 2), // mulhu
        muldiv(6, 0b010, 1, 2), // mulhsu
    ]);
    run(&mut emu, 6);
    assert_eq!(emu.cpu.read_reg(3), (-6i32) as u32);
    assert_eq!(emu.cpu.read_reg(4), u32::MAX, "high word of -6 is all ones");
    assert_eq!(emu.cpu.read_reg(5), 0);
    assert_eq!(
        emu.cpu.read_reg(6),
        (((-2i64) * 3) >> 32) as u32,
        "signed x unsigned"
    );
}

#[test]
fn division_edge_cases_follow_the_manual() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 7),
        muldiv(2, 0b100, 1, 0),  // div by zero -> -1
        muldiv(3, 0b101, 1, 0),  // divu by zero -> MAX
        muldiv(4, 0b110, 1, 0),  // rem by zero -> dividend
        muldiv(5, 0b111, 1, 0),  // remu by zero -> dividend
        lui(6, 0x8000_0000),     // i32::MIN
        addi(7, 0, -1),
        muldiv(8, 0b100, 6, 7),  // MIN / -1 -> MIN
        muldiv(9, 0b110, 6, 7),  // MIN % -1 -> 0
    ]);
    run(&mut emu, 9);
    assert_eq!(emu.cpu.read_reg(2), u32::MAX);
    assert_eq!(emu.cpu.read_reg(3), u32::MAX);
    assert_eq!(emu.cpu.read_reg(4), 7);
    assert_eq!(emu.cpu.read_reg(5), 7);
    assert_eq!(emu.cpu.read_reg(8), 0x8000_0000);
    assert_eq!(emu.cpu.read_reg(9), 0);
}

#[test]
fn signed_division_rounds_toward_zero() {
    let mut emu = machine_with_program(&[
        addi(1, 0, -7),
        addi(2, 0, 2),
        muldiv(3, 0b100, 1, 2), // -7 / 2 = -3
        muldiv(4, 0b110, 1, 2), // -7 % 2 = -1
    ]);
    run(&mut emu, 4);
    assert_eq!(emu.cpu.read_reg(3), (-3i32) as u32);
    assert_eq!(emu.cpu.read_reg(4), (-1i32) as u32);
}

#[test]
fn csr_read_write_instructions() {
    let mut emu = machine_with_program(&[
        addi(1, 0, 0xAA),
        csrrw(2, MSCRATCH, 1),   // old (0) -> x2, mscratch = 0xAA
        csrrs(3, MSCRATCH, 0),   // read without write
        addi(4, 0, 0x0F),
        csrrc(5, MSCRATCH, 4),   // clear low nibble
        csrrwi(6, MSCRATCH, 7),  // immediate write
        csrrsi(7, MSCRATCH, 24), // set bits 3..4 via uimm
    ]);
    run(&mut emu, 7);
    assert_eq!(emu.cpu.read_reg(2), 0);
    assert_eq!(emu.cpu.read_reg(3), 0xAA);
    assert_eq!(emu.cpu.read_reg(5), 0xAA);
    assert_eq!(emu.cpu.read_reg(6), 0xA0);
    assert_eq!(emu.cpu.read_reg(7), 7);
    assert_eq!(emu.cpu.load_csr(MSCRATCH), 7 | 24);
}

#[test]
fn lr_sc_pair_succeeds_and_stale_sc_fails() {
    let mut emu = machine_with_program(&[
        lui(1, 0x8000_1000),
        addi(2, 0, 5),
        sw(1, 2, 0),
        lr_w(3, 1),       // x3 = 5, reservation armed
        addi(4, 0, 9),
        sc_w(5, 1, 4),    // succeeds: x5 = 0, memory = 9
        sc_w(6, 1, 2),    // reservation consumed: x6 = 1, memory kept
    ]);
    run(&mut emu, 7);
    assert_eq!(emu.cpu.read_reg(3), 5);
    assert_eq!(emu.cpu.read_reg(5), 0, "sc with live reservation succeeds");
    assert_eq!(emu.cpu.read_reg(6), 1, "sc without reservation fails");
    assert_eq!(emu.cpu.bus.load(0x8000_1000, 32).unwrap(), 9);
}

#[test]
fn amoswap_and_amoadd_return_old_value() {
    let mut emu = machine_with_program(&[
        lui(1, 0x8000_1000),
        addi(2, 0, 10),
        sw(1, 2, 0),
        addi(3, 0, 32),
        amoadd_w(4, 1, 3),  // memory = 42, x4 = 10
        amoswap_w(5, 1, 2), // memory = 10, x5 = 42
    ]);
    run(&mut emu, 6);
    assert_eq!(emu.cpu.read_reg(4), 10);
    assert_eq!(emu.cpu.read_reg(5), 42);
    assert_eq!(emu.cpu.bus.load(0x8000_1000, 32).unwrap(), 10);
}

#[test]
fn misaligned_amo_is_fatal() {
    let mut emu = machine_with_program(&[
        lui(1, 0x8000_1000),
        addi(1, 1, 2),
        amoadd_w(2, 1, 0),
    ]);
    run(&mut emu, 2);
    match emu.step() {
        Err(Trap::StoreAmoAddressMisaligned(addr)) => assert_eq!(addr, 0x8000_1002),
        other => panic!("expected fatal misaligned AMO, got {other:?}"),
    }
}

#[test]
fn fences_and_wfi_are_no_ops() {
    let mut emu = machine_with_program(&[fence(), fence_i(), encode::wfi(), addi(1, 0, 1)]);
    run(&mut emu, 4);
    assert_eq!(emu.cpu.read_reg(1), 1);
    assert_eq!(emu.cpu.pc, DRAM_BASE + 16);
}

#[test]
fn illegal_instruction_reports_encoding() {
    let mut emu = machine();
    assert_eq!(
        emu.cpu.execute(0xFFFF_FFFF),
        Err(Trap::IllegalInstruction(0xFFFF_FFFF))
    );
    assert_eq!(emu.cpu.execute(0), Err(Trap::IllegalInstruction(0)));
}

#[test]
fn illegal_instruction_traps_without_halting() {
    let mut emu = machine_with_program(&[0xFFFF_FFFF]);
    emu.cpu.store_csr(rv32virt_core::core::arch::csr::MTVEC, 0x8000_0010);
    emu.step().unwrap();
    assert_eq!(emu.cpu.load_csr(rv32virt_core::core::arch::csr::MCAUSE), 2);
    assert_eq!(emu.cpu.load_csr(rv32virt_core::core::arch::csr::MEPC), DRAM_BASE);
    assert_eq!(emu.cpu.pc, 0x8000_0010);
}
